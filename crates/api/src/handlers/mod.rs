pub mod certificates;
pub mod events;
pub mod notifications;
pub mod participants;
pub mod purge;
pub mod scanners;
pub mod users;
