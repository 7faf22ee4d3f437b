mod closed_loop;
mod config_loading;
mod controller_properties;
mod end_to_end;
mod safety_interlock;
