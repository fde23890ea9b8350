use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    gsregress_lib::run().await
}
