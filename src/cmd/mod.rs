pub mod act;
pub mod init;
pub mod records;
pub mod render;
pub mod root;
