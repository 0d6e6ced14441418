pub mod dapr_control_plane;
