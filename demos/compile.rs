use clap::Parser;

use featlogic::compile::{CompileConfig, Compiler, MissingInstancePolicy, TranslationMode};
use featlogic::formula::Formula;
use featlogic::model::{FeatureModel, FeatureType, GroupKind};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Maximum number of drive slots (feature cardinality upper bound).
    #[arg(value_name = "INT", default_value = "3")]
    slots: u32,

    /// Minimum number of drive slots.
    #[clap(long, value_name = "INT", default_value = "1")]
    min_slots: u32,

    /// Use the simple translation instead of full unrolling.
    #[clap(long)]
    simple: bool,

    /// Keep the plain feature term when a contextual instance is missing.
    #[clap(long)]
    lenient: bool,

    /// Print debug logs.
    #[clap(long)]
    verbose: bool,
}

/// Server
/// ├── Slot [min..max]  (alternative)
/// │   ├── Ssd
/// │   └── Hdd
/// │       └── rpm: integer
/// ├── Raid
/// └── Backup
///
/// Constraints: Raid => Hdd, Backup => Slot.
fn server_model(min_slots: u32, max_slots: u32) -> color_eyre::Result<FeatureModel> {
    if max_slots == 0 {
        return Err(color_eyre::eyre::eyre!("Number of slots must be at least 1"));
    }
    if min_slots > max_slots {
        return Err(color_eyre::eyre::eyre!(
            "Minimum number of slots ({}) exceeds the maximum ({})",
            min_slots,
            max_slots
        ));
    }

    let mut model = FeatureModel::new();

    let server = model.add_root_feature("Server");
    model.make_mandatory(server);

    let slot = model.add_child_feature(server, "Slot");
    model.set_feature_cardinality(slot, min_slots, max_slots);
    model.set_group_kind(slot, GroupKind::Alternative);
    model.add_child_feature(slot, "Ssd");
    let hdd = model.add_child_feature(slot, "Hdd");
    let rpm = model.add_typed_feature("rpm", FeatureType::Integer);
    let rpm = model.add_child(hdd, rpm);
    model.make_mandatory(rpm);

    model.add_child_feature(server, "Raid");
    model.add_child_feature(server, "Backup");

    model.add_constraint(Formula::implies(Formula::literal("Raid"), Formula::literal("Hdd")))?;
    model.add_constraint(Formula::implies(Formula::literal("Backup"), Formula::literal("Slot")))?;

    Ok(model)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let model = server_model(args.min_slots, args.slots)?;
    let config = CompileConfig::default()
        .with_mode(if args.simple {
            TranslationMode::Simple
        } else {
            TranslationMode::Full
        })
        .with_missing_instance(if args.lenient {
            MissingInstancePolicy::FallBackToFeature
        } else {
            MissingInstancePolicy::Fail
        });
    let compiled = Compiler::new(config).compile(&model)?;

    println!("Conjuncts ({}):", compiled.conjuncts.len());
    for conjunct in &compiled.conjuncts {
        println!("  {}", conjunct);
    }
    println!("Variables ({}):", compiled.variables.len());
    for variable in &compiled.variables {
        println!("  {}", variable);
    }

    let time_total = time_total.elapsed();
    println!("\nDone in {:.3} s", time_total.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_slot_bounds() {
        assert!(server_model(1, 0).is_err());
        assert!(server_model(0, 0).is_err());
        assert!(server_model(4, 3).is_err());
        assert!(server_model(3, 3).is_ok());
    }

    #[test]
    fn test_server_model_compiles() {
        let model = server_model(1, 2).unwrap();
        let compiled = Compiler::default().compile(&model).unwrap();
        assert!(compiled.has_conjunct(&Formula::implies(Formula::literal("Slot_2"), Formula::literal("Slot_1"))));
    }
}
