use crate::preprocessing::ResampleFilter;
use crate::Args;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub filter: ResampleFilter,
}

impl TryFrom<Args> for Config {
    type Error = String;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let filter = ResampleFilter::from_str(&args.filter)
            .ok_or_else(|| format!("unknown resample filter {:?}", args.filter))?;

        Ok(Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            filter,
        })
    }
}
