pub mod resource;
pub mod transform;
pub mod use_case;
