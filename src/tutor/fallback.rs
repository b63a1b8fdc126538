//! Rule-based tutor fallback
//!
//! Deterministic answers assembled from the catalog metadata, used whenever
//! no LLM provider is configured or the provider call fails. Every function
//! here is a pure function of its arguments so replies are reproducible.

use crate::catalog::AlgorithmKind;

/// Answer a free-form question without an LLM (pure function)
///
/// Keyword buckets are checked in order; the first match wins. Without an
/// algorithm context the reply points at the catalog instead.
pub fn answer(question: &str, algorithm: Option<AlgorithmKind>) -> String {
    let Some(kind) = algorithm else {
        return catalog_overview();
    };

    let info = kind.info();
    let q = question.to_lowercase();

    if q.contains("complexity") || q.contains("big o") || q.contains("big-o") {
        return format!(
            "Time complexity of {}: {}. Space complexity: {}.",
            info.name, info.time_complexity, info.space_complexity
        );
    }

    if q.contains("compare") || q.contains("difference") || q.contains("versus") || q.contains(" vs ")
    {
        return compare_with_category_mates(kind);
    }

    if q.contains("step") || q.contains("how") || q.contains("work") {
        return format!("How {} works: {}", info.name, info.how_it_works);
    }

    if q.contains("use") || q.contains("when") || q.contains("real") {
        return format!("Where {} is used: {}", info.name, info.use_cases);
    }

    info.description.to_string()
}

/// One-shot explanation for the explain endpoint (pure function)
pub fn explain(algorithm: AlgorithmKind, step_message: Option<&str>) -> String {
    let info = algorithm.info();
    match step_message {
        Some(step) => format!(
            "In {}, the step \"{}\" is part of this process: {}",
            info.name, step, info.how_it_works
        ),
        None => format!("{} {}", info.description, info.how_it_works),
    }
}

/// Reply used when the question names no algorithm
fn catalog_overview() -> String {
    let listing = AlgorithmKind::all()
        .iter()
        .map(|kind| {
            let info = kind.info();
            format!("{} ({})", info.name, kind.wire_name())
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "I can explain any algorithm in this visualizer: {listing}. \
         Pick one and ask about its steps, complexity, or where it is used."
    )
}

/// Compare an algorithm with others in its catalog category
fn compare_with_category_mates(kind: AlgorithmKind) -> String {
    let info = kind.info();
    let mates: Vec<AlgorithmKind> = AlgorithmKind::all()
        .iter()
        .copied()
        .filter(|other| *other != kind && other.info().category == info.category)
        .collect();

    if mates.is_empty() {
        return format!(
            "{} is the only {} algorithm in this catalog. {}",
            info.name,
            info.category.label(),
            info.description
        );
    }

    let mut reply = format!(
        "{} and the other {} algorithms here differ like this. {}: {}",
        info.name,
        info.category.label(),
        info.name,
        info.description
    );
    for mate in mates {
        let mate_info = mate.info();
        reply.push_str(&format!(" {}: {}", mate_info.name, mate_info.description));
    }
    reply
}
