use ldpc_fec::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution as _, Normal};
use tempfile::tempdir;

fn short_code(seed: u64) -> Code {
    Code::random(10, 20, &[6; 10], &[3; 20], seed).unwrap()
}

/// Scans seeds until a construction admits a systematic encoder; random
/// matrices are occasionally rank-deficient.
fn built_random_code(m: usize, n: usize, dc: usize, dv: usize) -> Code {
    for seed in 0..100 {
        let mut code = Code::random(m, n, &vec![dc; m], &vec![dv; n], seed).unwrap();
        if code.create_encoder().is_ok() {
            return code;
        }
    }
    panic!("no full-rank ({}, {}) code in 100 seeds", m, n);
}

fn hard_decisions(llrs: &[f32]) -> Vec<u8> {
    llrs.iter().map(|&x| (x < 0.0) as u8).collect()
}

#[test]
fn test_no_error_short_code() {
    let code = built_random_code(10, 20, 6, 3);

    let info = vec![0u8; code.info_bits()];
    let cw = code.encode(&info).unwrap();
    assert!(cw.iter().all(|&b| b == 0));

    let llr = vec![1.0f32; code.variables()];
    let mut out = vec![0.0f32; code.variables()];
    let mut decoder = Decoder::new(&code, DecoderOptions::default());
    let report = decoder.decode(&code, &llr, 20, &mut out);

    assert!(report.converged);
    assert!(report.iterations <= 2);
    assert!(out.iter().all(|&x| x > 0.0));
}

#[test]
fn test_single_error_corrected() {
    let code = short_code(1);
    let mut llr = vec![3.0f32; code.variables()];
    llr[0] = -3.0;

    let mut out = vec![0.0f32; code.variables()];
    let mut decoder = Decoder::new(&code, DecoderOptions::default());
    let report = decoder.decode(&code, &llr, 20, &mut out);

    assert!(report.converged);
    assert!(out[0] > 0.0, "flipped bit not corrected: {}", out[0]);
    assert!(out.iter().all(|&x| x > 0.0));
}

#[test]
fn test_alist_round_trip() {
    let dir = tempdir().unwrap();
    for dialect in [AlistDialect::VariableWidth, AlistDialect::ZeroPadded] {
        let path = dir.path().join("t.alist");
        let mut code = short_code(1);
        alist::write_alist(&code, &path, dialect).unwrap();

        let mut read_back = alist::read_alist(&path).unwrap();
        code.sort_edges();
        read_back.sort_edges();

        assert_eq!(read_back.checks(), code.checks());
        assert_eq!(read_back.variables(), code.variables());
        assert_eq!(read_back.edge_checks(), code.edge_checks());
        assert_eq!(read_back.edge_vars(), code.edge_vars());
    }
}

#[test]
fn test_degree_preservation() {
    for seed in [3, 17, 99] {
        let code = Code::random(45, 90, &[6; 45], &[3; 90], seed).unwrap();
        assert_eq!(code.check_degrees(), vec![6; 45]);
        assert_eq!(code.var_degrees(), vec![3; 90]);
    }

    let check_dist = Distribution::create("6").unwrap();
    let var_dist = Distribution::create("3").unwrap();
    let code = Code::random_with_distribution(45, 90, &check_dist, &var_dist, 5).unwrap();
    assert_eq!(code.n_edges(), 270);
}

#[test]
fn test_encoding_commutes_with_h_across_shapes() {
    let shapes: [(usize, usize, usize, usize); 3] =
        [(10, 20, 6, 3), (16, 64, 12, 3), (45, 90, 6, 3)];
    for (m, n, dc, dv) in shapes {
        let mut code = Code::random(m, n, &vec![dc; m], &vec![dv; n], 23).unwrap();
        if code.create_encoder().is_err() {
            // Configuration-model matrices are occasionally rank-deficient;
            // that case is exercised elsewhere.
            continue;
        }
        let k = code.info_bits();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            let info: Vec<u8> = (0..k).map(|_| rng.gen_range(0..2) as u8).collect();
            let cw = code.encode(&info).unwrap();
            assert_eq!(&cw[..k], info.as_slice());
            assert_eq!(code.count_unsatisfied_checks(&cw).unwrap(), 0);
        }
    }
}

#[test]
fn test_no_noise_decoding_property() {
    let code = built_random_code(10, 20, 6, 3);
    let k = code.info_bits();
    let mut decoder = Decoder::new(&code, DecoderOptions::default());
    let mut rng = ChaCha8Rng::seed_from_u64(21);

    for _ in 0..10 {
        let info: Vec<u8> = (0..k).map(|_| rng.gen_range(0..2) as u8).collect();
        let cw = code.encode(&info).unwrap();
        let llr: Vec<f32> = cw.iter().map(|&b| if b == 0 { 1.0 } else { -1.0 }).collect();
        let mut out = vec![0.0f32; code.variables()];
        let report = decoder.decode(&code, &llr, 20, &mut out);
        assert!(report.converged);
        assert_eq!(hard_decisions(&out), cw);
    }
}

#[test]
fn test_min_sum_agrees_with_sum_product_at_high_snr() {
    let code = built_random_code(10, 20, 6, 3);
    let k = code.info_bits();
    let mut rng = ChaCha8Rng::seed_from_u64(31);

    let info: Vec<u8> = (0..k).map(|_| rng.gen_range(0..2) as u8).collect();
    let cw = code.encode(&info).unwrap();
    let llr: Vec<f32> = cw.iter().map(|&b| if b == 0 { 8.0 } else { -8.0 }).collect();

    for rule in [CheckRule::SumProduct, CheckRule::MinSum] {
        let mut decoder = Decoder::new(
            &code,
            DecoderOptions {
                rule,
                ..Default::default()
            },
        );
        let mut out = vec![0.0f32; code.variables()];
        let report = decoder.decode(&code, &llr, 20, &mut out);
        assert!(report.converged, "{:?} did not converge", rule);
        assert!(
            report.iterations <= 2,
            "{:?} took {} iterations",
            rule,
            report.iterations
        );
        assert_eq!(hard_decisions(&out), cw);
    }
}

#[test]
fn test_rank_deficient_code_reports_not_ready() {
    // Two identical check rows make the matrix rank 3.
    let mut code = Code::from_edges(
        4,
        8,
        &[
            (0, 0),
            (0, 1),
            (1, 0),
            (1, 1),
            (2, 2),
            (2, 3),
            (3, 4),
            (3, 5),
        ],
    )
    .unwrap();
    assert!(matches!(
        code.create_encoder(),
        Err(LdpcError::EncoderNotReady)
    ));
    assert!(code.parity_generator().is_none());
    assert!(matches!(
        code.encode(&[0; 4]),
        Err(LdpcError::EncoderNotReady)
    ));
}

#[test]
fn test_gaussian_noise_block_error_rate() {
    let code = built_random_code(45, 90, 6, 3);
    let n = code.variables();

    let esno = 5.0f64;
    let noise = Normal::new(0.0, (1.0 / (2.0 * esno)).sqrt()).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut decoder = Decoder::new(&code, DecoderOptions::default());

    let info = vec![0u8; code.info_bits()];
    let cw = code.encode(&info).unwrap();
    assert!(cw.iter().all(|&b| b == 0));

    let mut failures = 0;
    let mut llr = vec![0.0f32; n];
    let mut out = vec![0.0f32; n];
    for _ in 0..100 {
        for x in llr.iter_mut() {
            *x = 1.0 + noise.sample(&mut rng) as f32;
        }
        let report = decoder.decode(&code, &llr, 20, &mut out);
        if !report.converged {
            failures += 1;
        }
    }
    assert!(failures <= 5, "{} of 100 blocks failed", failures);
}

#[test]
fn test_facade_end_to_end_over_awgn() {
    let dir = tempdir().unwrap();
    let mut coder = LdpcCoder::new();
    coder
        .init(
            64,
            128,
            CoderOptions {
                optimize_avg_latency: true,
                cache_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        )
        .unwrap();

    // BPSK over AWGN at Es/N0 = 3, with the channel emitting scaled LLRs.
    let esno = 3.0f64;
    let noise = Normal::new(4.0 * esno, (8.0 * esno).sqrt()).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(77);

    let mut good = 0;
    for _ in 0..20 {
        let info: Vec<u8> = (0..64).map(|_| rng.gen_range(0..2) as u8).collect();
        let cw = coder.encode(&info).unwrap();

        let llr: Vec<i32> = cw
            .iter()
            .map(|&b| {
                let bpsk = if b == 0 { 1.0 } else { -1.0 };
                coder.llr2int((bpsk * noise.sample(&mut rng)) as f32)
            })
            .collect();

        let out = coder.decode(&llr).unwrap();
        if out.detected && out.info == info {
            good += 1;
        }
    }
    assert!(good >= 18, "only {} of 20 blocks decoded", good);
}
