use euclide::deduction::Deduction;
use euclide::problem::DeductionError;
use euclide::problems;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let (json, name) = match args.len() {
        2 => (false, args[1].as_str()),
        3 if args[1] == "--json" => (true, args[2].as_str()),
        _ => {
            eprintln!(
                "Usage: deduce [--json] <problem>\n\nAvailable problems:\n  - {}",
                problems::available_names().join("\n  - ")
            );
            std::process::exit(2);
        }
    };

    let problem = match problems::by_name(name) {
        Ok(Some(problem)) => problem,
        Ok(None) => {
            eprintln!(
                "Unknown problem: {name}\n\nAvailable problems:\n  - {}",
                problems::available_names().join("\n  - ")
            );
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("Failed to build problem {name}: {err}");
            std::process::exit(1);
        }
    };

    let mut deduction = Deduction::new(problem);
    match deduction.run() {
        Ok(report) => {
            if json {
                let out = serde_json::json!({
                    "problem": name,
                    "status": "solvable_so_far",
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&out).unwrap());
            } else {
                println!("Problem: {name}");
                println!(
                    "  passes: {}  mutual calls: {} (full {}, fast {}, overflows {})",
                    report.passes,
                    report.mutual_calls,
                    report.full_calls,
                    report.fast_calls,
                    report.fast_queue_overflows
                );
                for piece in &report.pieces {
                    let destination = match &piece.final_square {
                        Some(square) => square.clone(),
                        None => format!("{} candidates", piece.possible_squares.len()),
                    };
                    println!(
                        "  {} {} -> {destination}: moves {}/{}, captures {}/{}",
                        piece.glyph,
                        piece.initial_square,
                        piece.required_moves,
                        piece.available_moves,
                        piece.required_captures,
                        piece.available_captures
                    );
                }
            }
        }
        Err(DeductionError::NoSolution) => {
            if json {
                let out = serde_json::json!({ "problem": name, "status": "no_solution" });
                println!("{}", serde_json::to_string_pretty(&out).unwrap());
            } else {
                println!("Problem: {name}");
                println!("  no solution");
            }
        }
        Err(err) => {
            eprintln!("Deduction failed on {name}: {err}");
            std::process::exit(1);
        }
    }
}
