//! Test modules for point-to-point queues
