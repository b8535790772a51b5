pub mod odom_tracking;
pub mod odom_wheels;
