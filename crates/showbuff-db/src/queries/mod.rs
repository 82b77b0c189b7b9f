pub mod activity;
pub mod conversations;
pub mod friends;
pub mod imports;
pub mod lists;
pub mod reviews;
pub mod shows;
pub mod users;
