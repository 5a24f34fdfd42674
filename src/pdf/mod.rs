pub mod range;

pub use range::{
    extracted_file_name, page_file_name, parse_page_range, select_pages, split_archive_name,
    split_file_names,
};
