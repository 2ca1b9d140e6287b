//! Media value objects (image attachments and generated images).

pub mod image;
