use tf_idf_essay::{Corpus, Cutoff, EssayConfig, EssaySummarizer, ScoringMode, Upload};

fn main() {
    // decode uploads; invalid UTF-8 is reported, not fatal
    let uploads = vec![
        Upload::new(
            "rust.txt",
            "Rust is a systems programming language. Rust guarantees memory safety without a garbage collector.\n\n\
             The borrow checker enforces ownership rules. Many teams adopt Rust for reliability.",
        ),
        Upload::new(
            "go.txt",
            "Go is a systems programming language too. Go uses a garbage collector.\n\n\
             Goroutines make concurrency simple. Many teams adopt Go for simplicity.",
        ),
        Upload::new("broken.bin", vec![0xC3u8, 0x28]),
    ];
    let (corpus, rejected) = Corpus::from_uploads(uploads);
    for e in &rejected {
        println!("rejected: {e}");
    }

    // summarizer with a small skip count
    let mut config = EssayConfig::default();
    config.selection.skip_top = 2;
    config.selection.cutoff = Cutoff::AtOrAbove;
    let summarizer = EssaySummarizer::new(config);

    for mode in [ScoringMode::Statistical, ScoringMode::Positional] {
        let essay = summarizer.summarize_with(&corpus, mode);
        println!("[{mode}] {}", essay.text);
    }

    // statistical and semantic side by side
    let pair = summarizer.summarize_pair(&corpus);
    println!("[statistical] {}", pair.statistical.text);
    println!("[semantic] {}", pair.semantic.text);
    println!("{:?}", pair.semantic.report);
}
