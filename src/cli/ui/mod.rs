pub mod prompts;
pub mod search_box;
pub mod test_mode;
