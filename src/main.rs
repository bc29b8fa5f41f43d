use flow_activities::{activities, config::Config};

fn main() -> anyhow::Result<()> {
    activities::run(Config::from_env())
}
