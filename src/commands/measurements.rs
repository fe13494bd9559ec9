//! Measurement commands: set, show, clear

use colored::Colorize;

use fitcheck::config::Config;
use fitcheck::error::{FitError, Result};
use fitcheck::measurements::{Gender, MeasurementInput, MeasurementStore, Measurements};
use fitcheck::units::{self, Unit};

fn prompt_error(e: inquire::InquireError) -> FitError {
    FitError::PromptError(e.to_string())
}

/// Use the flag value, or ask for it
fn value_or_prompt(value: Option<String>, label: &str, help: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => inquire::Text::new(label)
            .with_help_message(help)
            .prompt()
            .map_err(prompt_error),
    }
}

/// Save measurements, prompting for any not passed as flags
pub fn cmd_measurements_set(
    gender: Option<String>,
    bust: Option<String>,
    waist: Option<String>,
    hips: Option<String>,
    height: Option<String>,
    inseam: Option<String>,
) -> Result<()> {
    let unit_help = "e.g. 94cm or 37in; bare numbers under 50 are inches";
    let interactive = [&gender, &bust, &waist, &hips, &height].iter().any(|v| v.is_none());

    let gender = match gender {
        Some(g) => g.parse::<Gender>()?,
        None => {
            let choice = inquire::Select::new("Size charts for:", vec!["Women", "Men"])
                .prompt()
                .map_err(prompt_error)?;
            choice.parse::<Gender>()?
        }
    };

    let bust = value_or_prompt(bust, "Bust / chest:", unit_help)?;
    let waist = value_or_prompt(waist, "Waist:", unit_help)?;
    let hips = value_or_prompt(hips, "Hips:", unit_help)?;
    let height = value_or_prompt(height, "Height:", "e.g. 168cm")?;
    let inseam = match inseam {
        Some(v) => Some(v),
        None if interactive => inquire::Text::new("Inside leg (optional):")
            .with_help_message("leave empty to estimate from height")
            .prompt_skippable()
            .map_err(prompt_error)?,
        None => None,
    };

    let input = MeasurementInput {
        gender,
        bust,
        waist,
        hips,
        height,
        inseam,
    };
    let measurements = Measurements::from_input(&input)?;

    let store = MeasurementStore::open_default()?;
    store.save(&measurements)?;

    println!("{} Measurements saved to {}", "✓".green(), store.path().display());
    print_measurements(&measurements, Config::load()?.display_unit);
    Ok(())
}

fn format_length(cm: f64, unit: Unit) -> String {
    let value = match unit {
        Unit::Cm => cm,
        Unit::Inches => units::cm_to_inches(cm),
    };
    format!("{:.1} {}", value, unit.suffix())
}

fn print_measurements(m: &Measurements, unit: Unit) {
    let gender = match m.gender {
        Gender::Female => "women's sizing",
        Gender::Male => "men's sizing",
    };
    println!("  {} {}", "Charts:".dimmed(), gender);
    println!("  {} {}", "Bust:".dimmed(), format_length(m.bust_cm, unit));
    println!("  {} {}", "Waist:".dimmed(), format_length(m.waist_cm, unit));
    println!("  {} {}", "Hips:".dimmed(), format_length(m.hips_cm, unit));
    println!("  {} {}", "Height:".dimmed(), format_length(m.height_cm, unit));

    let inseam = format_length(m.effective_inseam_cm(), unit);
    if m.inseam_estimated() {
        println!("  {} {} {}", "Inseam:".dimmed(), inseam, "(estimated from height)".dimmed());
    } else {
        println!("  {} {}", "Inseam:".dimmed(), inseam);
    }

    if let Some(saved_at) = m.saved_at {
        println!("  {} {}", "Saved:".dimmed(), saved_at.format("%Y-%m-%d %H:%M UTC"));
    }
}

/// Print saved measurements
pub fn cmd_measurements_show(json: bool) -> Result<()> {
    let store = MeasurementStore::open_default()?;
    let measurements = store.load()?.ok_or(FitError::NoMeasurements)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&measurements)?);
        return Ok(());
    }

    println!();
    print_measurements(&measurements, Config::load()?.display_unit);
    Ok(())
}

/// Delete saved measurements
pub fn cmd_measurements_clear(yes: bool) -> Result<()> {
    let store = MeasurementStore::open_default()?;

    if !yes {
        let confirmed = inquire::Confirm::new("Delete saved measurements?")
            .with_default(false)
            .prompt()
            .map_err(prompt_error)?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.clear()? {
        println!("{} Measurements deleted", "✓".green());
    } else {
        println!("No measurements were saved.");
    }
    Ok(())
}
