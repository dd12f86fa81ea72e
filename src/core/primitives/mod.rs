pub mod container;
pub mod gate;
pub mod queue;
pub mod resource;

pub use container::LevelContainer;
pub use gate::Gate;
pub use queue::MessageQueue;
pub use resource::ResourcePool;
