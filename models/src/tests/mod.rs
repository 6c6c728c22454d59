mod extraction;
mod page_builder;
mod partial;
mod token;
