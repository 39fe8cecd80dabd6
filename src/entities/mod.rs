// ABOUTME: SeaORM entities module for the plant catalog database models
// ABOUTME: Exports users, plants, categories, locations, registrations, images, comments, ratings

pub mod user;
pub mod plant;
pub mod category;
pub mod plant_category;
pub mod location;
pub mod registration;
pub mod image;
pub mod comment;
pub mod rating;

pub use user::Entity as User;
pub use plant::Entity as Plant;
pub use category::Entity as Category;
pub use plant_category::Entity as PlantCategory;
pub use location::Entity as Location;
pub use registration::Entity as Registration;
pub use image::Entity as Image;
pub use comment::Entity as Comment;
pub use rating::Entity as Rating;
