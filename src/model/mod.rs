pub mod network;
pub mod node;
pub mod junction;
pub mod reservoir;
pub mod tank;
pub mod link;
pub mod pipe;
pub mod pump;
pub mod valve;
pub mod options;
