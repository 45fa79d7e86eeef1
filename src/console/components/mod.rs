pub mod home;
pub mod input_dialog;
pub mod login;
pub mod navigation_input;
pub mod table;
pub mod user_details;
