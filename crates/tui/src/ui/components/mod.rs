pub mod hints;
pub mod money;
pub mod panel;
pub mod toast;
