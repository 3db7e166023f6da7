pub(crate) mod custom;
pub(crate) mod encoder;
pub(crate) mod generator;

pub use custom::{CustomEncoder, CustomEncoderFunc, CustomGenerator, CustomGeneratorFunc};
pub use encoder::Encoder;
pub use generator::{GenerationMode, GenerationOutput, Generator};
