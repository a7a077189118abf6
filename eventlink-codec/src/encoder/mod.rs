/// Conversion of native types into their field element encodings.
pub mod field_elements;
