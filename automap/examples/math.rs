//! Serves a math module and a small custom module.
//!
//! ```text
//! cargo run --example math
//! curl 'localhost:3000/math/sqrt?_args=i:16'        # 4.0
//! curl 'localhost:3000/math/pow?base=f:2&exp=i:10'  # 1024.0
//! curl 'localhost:3000/tools/parse_hex?_args=h:ff'  # 255
//! curl 'localhost:3000/tools/mean?values=s:1,2,3'  # 2.0
//!
//! AUTOMAP_INTROSPECTION=true cargo run --example math
//! curl 'localhost:3000/__automap/routes'
//! ```

use automap::logging::{self, TracingConfig};
use automap::prelude::*;

#[derive(Clone, Default)]
struct Tools {
    greeting: String,
}

#[expose]
impl Tools {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn greet(&self, name: String) -> String {
        let greeting = if self.greeting.is_empty() {
            "hello"
        } else {
            self.greeting.as_str()
        };
        format!("{greeting}, {name}")
    }

    pub fn parse_hex(value: i64) -> i64 {
        value
    }

    pub fn mean(values: Value) -> Result<f64, String> {
        match values {
            Value::Str(list) => {
                let numbers = list
                    .split(',')
                    .map(|n| n.trim().parse::<f64>().map_err(|e| e.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                if numbers.is_empty() {
                    return Err("mean of empty list".to_string());
                }
                Ok(numbers.iter().sum::<f64>() / numbers.len() as f64)
            }
            other => Err(format!("expected a comma separated list, not {}", other.type_name())),
        }
    }
}

fn math() -> Module {
    use std::f64::consts;

    Module::new("math")
        .value("pi", consts::PI)
        .value("e", consts::E)
        .function("sqrt", &["x"], |x: f64| {
            if x < 0.0 {
                Err("math domain error")
            } else {
                Ok(x.sqrt())
            }
        })
        .function("pow", &["base", "exp"], f64::powf)
        .function("hypot", &["x", "y"], f64::hypot)
        .function("log", &["x", "base"], |x: f64, base: Option<f64>| match base {
            Some(base) => x.log(base),
            None => x.ln(),
        })
        .function("abs", &["z"], |z: Complex| z.re.hypot(z.im))
        .module(
            "trig",
            Module::new("trig")
                .function("sin", &["x"], f64::sin)
                .function("cos", &["x"], f64::cos)
                .function("tan", &["x"], f64::tan),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();
    logging::init(&TracingConfig::from_env());

    let config = MapperConfig::from_env()?;
    let server = ServerConfig::from_env()?;

    let mut mapper = Mapper::with_config(config);
    mapper.register_type_handler("h", |raw| {
        i64::from_str_radix(raw, 16)
            .map(Value::Int)
            .map_err(|e| CoerceError::new("h", raw, e))
    });

    mapper.map(&math())?;
    mapper.map(&Tools::default())?;

    mapper.listen(&server.addr()).await?;
    Ok(())
}
