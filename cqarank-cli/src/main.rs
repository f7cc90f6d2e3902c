//! cqarank CLI - question similarity ranking for SemEval CQA

use anyhow::Result;
use clap::{Parser, Subcommand};
use cqarank::analysis::length_histogram;
use cqarank::corpus::{load_document_tree, DocumentTree};
use cqarank::prediction::{load_predictions, save_predictions, write_predictions};
use cqarank::search::{run_experiment, SearchReport};
use cqarank::similarity::{FeatureWeighting, Weighter};
use cqarank::{
    classify_id, evaluate, out_of_corpus_value, score_with, ContentScope, ExperimentConfig,
    FilterCombination, IdKind, IdfTable, Indicator, Relevance, ScoringContext, Similarity,
    Stopwords, TreeCache,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cqarank")]
#[command(
    author,
    version,
    about = "Rank SemEval CQA candidates with TF-IDF similarities and measure MAP"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Document tree cache directory (default: ~/.cache/cqarank)
    #[arg(long, env = "CQARANK_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the document tree cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one configuration and write a prediction file
    Score {
        /// Annotated records of the corpus to score (JSON lines)
        records: PathBuf,

        /// Annotated records of the IDF training corpus (default: the scored corpus)
        #[arg(long, short = 't')]
        training: Option<PathBuf>,

        /// Similarity (baseline, filtered, lemma, scaled, scaled_occurrences, weighted)
        #[arg(long, short = 's', default_value = "baseline")]
        similarity: String,

        /// Indicator (tokens, lemmas, named_entities_text, named_entities_label)
        #[arg(long, short = 'i', default_value = "tokens")]
        indicator: String,

        /// Filter combination, e.g. "nostopwords+gtr2"
        #[arg(long, short = 'f', default_value = "nofilter")]
        filters: String,

        /// Candidate scope (questions, questions_with_comments)
        #[arg(long, default_value = "questions")]
        scope: String,

        /// Stopword list, one word per line (default: built-in English list)
        #[arg(long)]
        stopwords: Option<PathBuf>,

        /// Weight of the weighted similarity
        #[arg(long, default_value = "0.6")]
        weight: f64,

        /// Weighters of the weighted similarity (noun, adjective, verb, entity)
        #[arg(long = "weighter", short = 'w')]
        weighters: Vec<String>,

        /// Prediction file to write (default: stdout)
        #[arg(long, short = 'p')]
        output: Option<PathBuf>,

        /// Also evaluate against this relevancy file
        #[arg(long, short = 'r')]
        relevancy: Option<PathBuf>,
    },

    /// Compute MAP of a prediction file
    Evaluate {
        /// Prediction file
        predictions: PathBuf,

        /// Relevancy file (or JSON object of judgments)
        relevancy: PathBuf,

        /// Show Average Precision of every original question
        #[arg(long)]
        per_question: bool,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Run a YAML experiment and report the best configuration per corpus
    Search {
        /// Experiment configuration
        config: PathBuf,

        /// Number of per-question gains shown per corpus
        #[arg(long, short = 'n', default_value = "5")]
        top: usize,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Classify corpus ids
    Classify {
        /// Ids to classify
        #[arg(required = true)]
        ids: Vec<String>,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Token length histogram of a corpus
    Lengths {
        /// Annotated records (JSON lines)
        records: PathBuf,

        /// Split totals at this length
        #[arg(long, default_value = "3")]
        threshold: usize,

        /// Candidate scope (questions, questions_with_comments)
        #[arg(long, default_value = "questions")]
        scope: String,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cache = if cli.no_cache {
        None
    } else {
        Some(TreeCache::new(
            cli.cache_dir.unwrap_or_else(cqarank::default_cache_dir),
        ))
    };

    match cli.command {
        Commands::Score {
            records,
            training,
            similarity,
            indicator,
            filters,
            scope,
            stopwords,
            weight,
            weighters,
            output,
            relevancy,
        } => {
            let options = ScoreOptions {
                similarity,
                indicator,
                filters,
                scope,
                stopwords,
                weight,
                weighters,
            };
            cmd_score(
                cache.as_ref(),
                &records,
                training.as_deref(),
                &options,
                output.as_deref(),
                relevancy.as_deref(),
            )
        }
        Commands::Evaluate {
            predictions,
            relevancy,
            per_question,
            format,
        } => cmd_evaluate(&predictions, &relevancy, per_question, &format),
        Commands::Search { config, top, format } => {
            cmd_search(cache.as_ref(), &config, top, &format)
        }
        Commands::Classify { ids, format } => cmd_classify(&ids, &format),
        Commands::Lengths {
            records,
            threshold,
            scope,
            format,
        } => cmd_lengths(cache.as_ref(), &records, threshold, &scope, &format),
    }
}

struct ScoreOptions {
    similarity: String,
    indicator: String,
    filters: String,
    scope: String,
    stopwords: Option<PathBuf>,
    weight: f64,
    weighters: Vec<String>,
}

impl ScoreOptions {
    fn similarity(&self) -> Result<Similarity> {
        if !(0.0..=1.0).contains(&self.weight) {
            anyhow::bail!("Weight must be within [0, 1], got {}", self.weight);
        }
        Ok(match self.similarity.parse::<Similarity>()? {
            Similarity::FeatureWeighted(default) => {
                let weighters = if self.weighters.is_empty() {
                    default.weighters
                } else {
                    self.weighters
                        .iter()
                        .map(|w| w.parse::<Weighter>())
                        .collect::<cqarank::Result<Vec<_>>>()?
                };
                Similarity::FeatureWeighted(FeatureWeighting {
                    weight: self.weight,
                    weighters,
                    scale: default.scale,
                })
            }
            other => other,
        })
    }
}

fn cmd_score(
    cache: Option<&TreeCache>,
    records: &Path,
    training: Option<&Path>,
    options: &ScoreOptions,
    output: Option<&Path>,
    relevancy: Option<&Path>,
) -> Result<()> {
    let similarity = options.similarity()?;
    let indicator: Indicator = options.indicator.parse()?;
    let filters: FilterCombination = options.filters.parse()?;
    let scope: ContentScope = options.scope.parse()?;
    let stopwords = match &options.stopwords {
        Some(path) => Stopwords::load(path)?,
        None => Stopwords::english(),
    };

    let tree = load_document_tree(records, scope, cache)?;
    if tree.is_empty() {
        anyhow::bail!("No original question found in {}", records.display());
    }
    let training_tree: Option<DocumentTree> = match training {
        Some(path) => Some(load_document_tree(path, scope, cache)?),
        None => None,
    };

    let spec = similarity.bag_spec(indicator, filters);
    let idf_source = training_tree.as_ref().unwrap_or(&tree);
    let idf = IdfTable::from_tree(
        idf_source,
        similarity.effective_indicator(indicator),
        similarity.lowercases(),
    );
    let out_of_corpus = out_of_corpus_value(idf_source.documents());
    let ctx = ScoringContext::new(Arc::new(idf), out_of_corpus, spec, Arc::new(stopwords));
    let scores = score_with(&tree, &similarity, &ctx);

    match output {
        Some(path) => {
            save_predictions(path, &scores)?;
            eprintln!(
                "Wrote {} scores to {}",
                tree.candidate_count(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_predictions(stdout.lock(), &scores)?;
            println!();
        }
    }

    if let Some(path) = relevancy {
        let evaluation = evaluate(&scores, &Relevance::load(path)?)?;
        eprintln!("MAP: {:.4}", evaluation.map);
    }
    Ok(())
}

fn cmd_evaluate(predictions: &Path, relevancy: &Path, per_question: bool, format: &str) -> Result<()> {
    let scores = load_predictions(predictions)?;
    let relevance = Relevance::load(relevancy)?;
    let evaluation = evaluate(&scores, &relevance)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    println!("MAP: {:.4}", evaluation.map);
    if per_question {
        let mut questions: Vec<(&String, &f64)> = evaluation.per_question.iter().collect();
        questions.sort_by(|a, b| cqarank::natural_cmp(a.0, b.0));
        for (original, ap) in questions {
            println!("  {}\t{:.4}", original, ap);
        }
    }
    Ok(())
}

fn cmd_search(cache: Option<&TreeCache>, config_path: &Path, top: usize, format: &str) -> Result<()> {
    let config = ExperimentConfig::load(config_path)?;
    let config_cache = config.cache_dir.as_ref().map(TreeCache::new);
    let report = run_experiment(&config, config_cache.as_ref().or(cache))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_search_report(&report, top);
    Ok(())
}

fn print_search_report(report: &SearchReport, top: usize) {
    println!(
        "{} ({} trials, {})",
        report.method,
        report.trials.len(),
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (corpus, best) in &report.best {
        println!();
        println!("Corpus {}", corpus);
        println!("  Best:     {} (MAP {:.4})", best.best.name, best.best.map);
        if let Some(baseline) = &best.baseline {
            println!("  Baseline: {} (MAP {:.4})", baseline.name, baseline.map);
        }
        if !best.gains.is_empty() {
            println!("  Largest gains over baseline:");
            for gain in best.gains.iter().take(top) {
                println!("    {}\t{:+.4}", gain.original, gain.difference);
            }
        }
    }
}

#[derive(Serialize)]
struct Classification {
    id: String,
    kind: &'static str,
    original: Option<String>,
    related: Option<String>,
}

fn cmd_classify(ids: &[String], format: &str) -> Result<()> {
    let classified: Vec<Classification> = ids
        .iter()
        .map(|id| {
            let kind = classify_id(id);
            Classification {
                id: id.clone(),
                kind: match kind {
                    IdKind::Original { .. } => "original",
                    IdKind::Related { .. } => "related",
                    IdKind::Comment { .. } => "comment",
                    IdKind::Unrecognized => "unrecognized",
                },
                original: kind.original_id().map(str::to_string),
                related: kind.related_id(),
            }
        })
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }
    for entry in &classified {
        println!("{}\t{}", entry.id, entry.kind);
    }
    Ok(())
}

fn cmd_lengths(
    cache: Option<&TreeCache>,
    records: &Path,
    threshold: usize,
    scope: &str,
    format: &str,
) -> Result<()> {
    let scope: ContentScope = scope.parse()?;
    let tree = load_document_tree(records, scope, cache)?;
    let histogram = length_histogram(&tree, threshold);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&histogram)?);
        return Ok(());
    }

    println!("Tokens: {}", histogram.total());
    for (length, count) in &histogram.counts {
        println!("  {:>3}\t{}", length, count);
    }
    println!("Longer than {}: {}", threshold, histogram.above);
    println!("At most {}: {}", threshold, histogram.at_or_below);
    Ok(())
}
