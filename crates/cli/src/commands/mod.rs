pub mod build;
pub mod images;
pub mod init;
pub mod preview;
pub mod validate;
