use log::{error, info};

use grade_ai::config::GraderConfig;
use grade_ai::client::Grader;

#[tokio::main]
async fn main()
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = match GraderConfig::from_env()
    {   Ok(config) => config
      , Err(e) => {
          error!("{}", e);
          std::process::exit(1);
        }
    };

    info!(
      "Grading with {} model {} at {}",
      config.provider.provider,
      config.provider.model_name,
      config.provider.endpoint_url
    );

    let grader = Grader::new(&config.provider);

    if let Err(e) = grade_ai::server::serve(&config.server, grader).await
    {   error!("{}", e);
        std::process::exit(1);
    }
}
