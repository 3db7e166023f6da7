pub fn debug(s: impl Into<String> + std::fmt::Display) {
    log::debug!("{}", s);
}

pub fn info(s: impl Into<String> + std::fmt::Display) {
    log::info!("{}", s);
}

pub fn warn(s: impl Into<String> + std::fmt::Display) {
    log::warn!("{}", s);
}
