pub mod field_elements;
pub mod native;
