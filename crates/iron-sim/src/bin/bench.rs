//! CLI bench binary for manual PID tuning against the thermal plant
//! model, without any hardware attached.

use anyhow::Result;
use clap::Parser;
use iron_sim::{new_sim_channel, run_closed_loop, ThermalPlant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Closed-loop bench for iron-core PID tuning")]
struct Cli {
    #[arg(long, default_value_t = 250.0)]
    setpoint_c: f32,

    #[arg(long, default_value_t = 25.0)]
    ambient_c: f32,

    #[arg(long, default_value_t = 0.08)]
    kp: f32,

    #[arg(long, default_value_t = 0.01)]
    ki: f32,

    #[arg(long, default_value_t = 0.2)]
    kd: f32,

    #[arg(long, default_value_t = 0.5)]
    derivative_tau_s: f32,

    #[arg(long, default_value_t = 200.0)]
    gain: f32,

    #[arg(long, default_value_t = 300.0)]
    run_seconds: f32,

    #[arg(long, default_value_t = 0.25)]
    dt_s: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut channel = new_sim_channel(cli.gain);
    channel.pid.kp = cli.kp;
    channel.pid.ki = cli.ki;
    channel.pid.kd = cli.kd;
    channel.pid.derivative_tau = cli.derivative_tau_s;

    let mut plant = ThermalPlant::new(cli.ambient_c, 2.5, 0.1);
    let steps = (cli.run_seconds / cli.dt_s) as usize;

    tracing::info!(setpoint = cli.setpoint_c, steps, "starting bench run");

    let trace = run_closed_loop(&mut channel, &mut plant, cli.setpoint_c, steps, cli.dt_s);

    println!("time_s,temp_c");
    for (i, temp) in trace.iter().enumerate() {
        let t = i as f32 * cli.dt_s;
        println!("{:.2},{:.2}", t, temp);
    }

    Ok(())
}
