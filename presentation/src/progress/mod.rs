//! Progress indicators while a reply is requested and streamed

pub mod reporter;
