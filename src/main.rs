use anyhow::Result;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    let args = beatsync::monitor::MonitorArgs::parse(std::env::args().skip(1))?;
    beatsync::monitor::run(args)
}
