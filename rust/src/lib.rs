pub mod analysis;
pub mod config_store;
pub mod export;
pub mod field_model;
pub mod form;
pub mod gemini;
pub mod generation_store;
pub mod legal_texts;
pub mod main_ui_html;
pub mod path_utils;
pub mod pptx;
pub mod rule_engine;
pub mod server;
pub mod spreadsheet;
