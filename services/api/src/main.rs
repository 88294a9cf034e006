use medcalc::error::{AppError, ErrorEnvelope};
use medcalc_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        match &err {
            AppError::Service(service_error) => {
                eprintln!("{:#}", ErrorEnvelope::from(service_error).body())
            }
            other => eprintln!("application error: {other}"),
        }
        std::process::exit(1);
    }
}
