pub mod control_button;
