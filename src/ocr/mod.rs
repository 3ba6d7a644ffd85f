pub mod engine;
pub mod preprocess;
pub mod setup;

#[cfg(test)]
pub mod scripted;

pub use preprocess::PreprocessMode;
pub use setup::ensure_tesseract;
