use eolia::{EoliaClient, OperationMode, TrafficLogMode};
use std::env;

#[tokio::main]
async fn main() -> eolia::Result<()> {
    tracing_subscriber::fmt::init();

    let user = env::var("EOLIA_USER_ID").expect("EOLIA_USER_ID must be set");
    let pass = env::var("EOLIA_PASSWORD").expect("EOLIA_PASSWORD must be set");
    let args: Vec<String> = env::args().collect();
    let cool_to = args.get(1).and_then(|t| t.parse::<f64>().ok());

    let mut builder = EoliaClient::builder(user, pass).on_event(|event| {
        println!("{event:?}");
    });
    if let Ok(cookie) = env::var("EOLIA_SESSION") {
        builder = builder.session(cookie);
    }
    if let Ok(path) = env::var("EOLIA_TRAFFIC_LOG") {
        builder = builder.traffic_log(TrafficLogMode::Diffed, path);
    }
    let mut client = builder.build()?;

    client.begin().await?;

    let ids: Vec<String> = client
        .devices(false)
        .await?
        .iter()
        .map(|d| d.appliance_id().to_string())
        .collect();

    for id in &ids {
        if let Some(device) = client.device(id) {
            println!(
                "[{}] {} | {:?} | target {:?}\u{00b0}C | inside {:?}\u{00b0}C | outside {:?}\u{00b0}C | blast: {}",
                device.nickname().unwrap_or(id),
                device.product_name().unwrap_or("?"),
                device.operation_mode(),
                device.temperature(),
                device.inside_temperature(),
                device.outside_temperature(),
                device.supports("blast"),
            );
        }
    }

    if let (Some(target), Some(id)) = (cool_to, ids.first()) {
        if let Some(device) = client.device_mut(id) {
            device.set_operation_status(true);
            device.set_operation_mode(OperationMode::Cooling)?;
            device.set_temperature(target);
        }
        let device = client.apply(id).await?;
        println!("applied: {:?} at {:?}\u{00b0}C", device.operation_mode(), device.temperature());
    }

    Ok(())
}
