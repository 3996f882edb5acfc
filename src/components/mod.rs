pub mod colors;
pub mod dialogs;
pub mod editor;
pub mod feed;
