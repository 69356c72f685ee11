//! Hull Explorer CLI - Run an exploration from a JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;

use hull_explorer::{
    compute::ExplorationEngine,
    schema::{GeneratorConfig, RunConfig, StopConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Run a hull exploration from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let config = RunConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let mut engine = ExplorationEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let config = engine.config();
    println!("Hull Explorer");
    println!("=============");
    println!(
        "Structure: {:?} ({} degrees of freedom)",
        config.structure, config.degrees_of_freedom
    );
    println!("Generator: {}", config.generator.name());
    println!(
        "Generations: {} x {} children",
        config.number_of_generations, config.children_per_generation
    );
    match engine.schedule().levels() {
        [bins] => println!("Bins: {bins} per axis"),
        levels => println!("Bins: {levels:?} per axis, refined over the run"),
    }
    println!();

    let result = engine
        .run_with_callback(|progress| {
            println!(
                "  Generation {}/{}: {} boxes, {}/{} bins ({:.1}%), {} new",
                progress.generation,
                progress.total_generations,
                progress.population,
                progress.occupied,
                progress.bins * progress.bins,
                progress.coverage * 100.0,
                progress.new_bins
            );
        })
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    println!();
    println!("Stop reason: {:?}", result.stop_reason);
    println!("Generations: {}", result.generations);
    println!("Total boxes: {}", result.total_boxes);
    println!(
        "Coverage: {}/{} bins ({:.2}%)",
        result.occupied_bins.len(),
        result.bins * result.bins,
        result.coverage * 100.0
    );
    for hit in &result.benchmarks_hit {
        println!(
            "  Benchmark {:.1}% reached at generation {}",
            hit.benchmark * 100.0,
            hit.generation
        );
    }
    println!("Time: {:.2}s", result.elapsed_seconds);
}

fn print_example_config() {
    let config = RunConfig {
        generator: GeneratorConfig::default(),
        stopping: StopConfig {
            benchmarks: vec![0.25, 0.5, 0.75],
            ..Default::default()
        },
        random_seed: Some(42),
        ..Default::default()
    };

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing example: {e}"),
    }
}
