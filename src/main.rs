use std::error::Error;
use vpc_service_topology::config::load_config;
use vpc_service_topology::external::Collaborators;
use vpc_service_topology::output::{print_summary, write_plan};
use vpc_service_topology::synthesize;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default())?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    // vpc-service-topology [config.json] [plan-out.json]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;

    let synthesis = synthesize(&config, &mut Collaborators::declarative())?;
    print_summary(&synthesis);
    let plan_file = write_plan(&synthesis.plan, args.get(1).map(String::as_str))?;

    log::info!("#End main() plan written to {plan_file}");
    Ok(())
}
