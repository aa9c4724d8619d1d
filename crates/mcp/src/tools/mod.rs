pub mod ping;
pub mod weather;
mod registry;

pub use ping::PingTool;
pub use weather::WeatherTool;
pub use registry::{
    contain, json_schema_array, json_schema_boolean, json_schema_integer, json_schema_number,
    json_schema_object, json_schema_string, parse_arguments, Tool, ToolError, ToolOutput,
    ToolRegistry,
};
