pub mod file;
pub mod pacer;

pub use file::AudioFile;
pub use pacer::AudioPacer;
