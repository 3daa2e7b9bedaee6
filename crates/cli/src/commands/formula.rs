//! `dossier formula`: Parse one expression and print every rendering.

use dossier_core::Equation;
use dossier_formula::{Env, evaluate, linearize, parse_statement, sides, to_latex, to_mathml};

pub fn run(expression: &str, vars: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let env = parse_bindings(vars)?;
    let equation = parse_statement(expression).ok_or("nothing to parse")?;

    println!("  Source:    {}", equation.source);
    if let Some(label) = &equation.label {
        println!("  Label:     {label}");
    }
    if let Some(number) = &equation.number {
        println!("  Number:    ({number})");
    }
    if let Some(qualifier) = &equation.qualifier {
        println!("  Qualifier: {qualifier}");
    }
    if let Some(fallback) = &equation.fallback {
        println!("  ⚠️  Kept verbatim: {fallback}");
    }

    println!("  Linear:    {}", linearize(&equation.root));
    println!("  LaTeX:     {}", to_latex(&equation.root));
    println!("  MathML:    {}", to_mathml(&equation.root));
    println!();
    println!("{}", serde_json::to_string_pretty(&equation.root)?);

    if !env.is_empty() {
        println!();
        for line in evaluation(&equation, &env) {
            println!("  {line}");
        }
    }

    Ok(())
}

/// `name=value` pairs into an environment.
fn parse_bindings(vars: &[String]) -> Result<Env, String> {
    let mut env = Env::new();
    for var in vars {
        let (name, value) = var
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{var}'"))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("'{value}' is not a number"))?;
        env.insert(name.trim().to_string(), value);
    }
    Ok(env)
}

/// Value of the expression, or of each side of a relation.
fn evaluation(equation: &Equation, env: &Env) -> Vec<String> {
    let show = |result: Result<f64, _>| match result {
        Ok(value) => value.to_string(),
        Err(e) => format!("error: {e}"),
    };
    match sides(&equation.root) {
        Some((op, left, right)) => vec![
            format!("Left:      {}", show(evaluate(left, env))),
            format!("Right:     {}", show(evaluate(right, env))),
            format!("Relation:  {}", op.symbol()),
        ],
        None => vec![format!("Value:     {}", show(evaluate(&equation.root, env)))],
    }
}
