use num_bigint::BigUint;
use proptest::prelude::*;

use vdf_msu::{
    compressor::compressor_tree_3_to_2,
    metzgen::moduloadd::Modulo,
    testing::reference,
    Limbs, MetzgenParams, ModularSquare, ModularSquareMetzgen, Modulus, Msu, Params,
};

fn below(bytes: Vec<u8>, bound: &BigUint) -> BigUint {
    BigUint::from_bytes_le(&bytes) % bound
}

fn small_metzgen() -> MetzgenParams {
    MetzgenParams {
        mod_len: 128,
        log_radix: 17,
        log_num_symbols: 3,
        io_stages: 2,
    }
}

proptest! {
    #[test]
    fn compressor_sums_exactly(terms in prop::collection::vec(0u64..1 << 17, 1..=120)) {
        let (carry, sum) = compressor_tree_3_to_2(&terms);
        prop_assert_eq!(carry + sum, terms.iter().sum::<u64>());
    }

    #[test]
    fn modular_add(
        a in prop::collection::vec(any::<u8>(), 16),
        b in prop::collection::vec(any::<u8>(), 16)
    ) {
        let modulus = Modulus::test_128();
        let m = modulus.value();
        let modulo = Modulo::new(m, 136);
        let (a, b) = (below(a, m), below(b, m));
        prop_assert_eq!(modulo.add(&a, &b), (&a + &b) % m);
    }

    #[test]
    fn one_round_squares_mod_m(x in prop::collection::vec(any::<u8>(), 17)) {
        let modulus = Modulus::test_128();
        let params = Params::new(8).unwrap();
        let core = ModularSquare::new(params, modulus.clone()).unwrap();
        let x = below(x, &(modulus.value() << 1u8));
        let limbs = Limbs::encode(&x, &params).unwrap();
        let out = core.square_reduce(&limbs.0);
        prop_assert!(out.fits(params.bit_len));
        prop_assert_eq!(out.value(params.word_len) % modulus.value(), &x * &x % modulus.value());
    }
}

#[test]
fn modular_add_boundaries() {
    let modulus = Modulus::test_128();
    let m = modulus.value();
    let modulo = Modulo::new(m, 136);
    let one = BigUint::from(1u8);
    assert_eq!(modulo.add(&(m - &one), &one), BigUint::default());
    assert_eq!(modulo.add(&(m - &one), &(m - &one)), m - 2u8);
}

#[test]
fn redundant_round_loop_matches_reference() {
    let modulus = Modulus::test_128();
    let params = Params::new(8).unwrap();
    let core = ModularSquare::new(params, modulus.clone()).unwrap();
    let x = BigUint::from(0x1234_5678_9abc_def0u64);
    let mut limbs = Limbs::encode(&x, &params).unwrap();
    for _ in 0..200 {
        limbs = core.square_reduce(&limbs.0);
    }
    assert_eq!(
        limbs.value(params.word_len) % modulus.value(),
        reference(&x, 200, &modulus)
    );
}

#[test]
fn iterated_squaring_strategy_a() {
    let modulus = Modulus::test_128();
    let core = ModularSquare::new(Params::new(8).unwrap(), modulus.clone()).unwrap();
    let mut msu = Msu::new(core).unwrap();
    for x in vdf_msu::testing::random_inputs(&modulus, 3) {
        let job = msu.compute(&x, 100).unwrap();
        assert_eq!(job.sq_out, reference(&x, 100, &modulus));
        assert_eq!(job.cycles, 600);
    }
}

#[test]
fn iterated_squaring_strategy_b() {
    let modulus = Modulus::test_128();
    let params = small_metzgen();
    let latency = params.latency();
    let core = ModularSquareMetzgen::new(params, modulus.clone()).unwrap();
    let mut msu = Msu::new(core).unwrap();
    // sq_in is MOD_LEN bits wide, so inputs are canonical here
    for x in vdf_msu::testing::random_inputs(&modulus, 3) {
        let x = x % modulus.value();
        let job = msu.compute(&x, 1000).unwrap();
        assert_eq!(job.sq_out, reference(&x, 1000, &modulus));
        assert_eq!(job.cycles, latency + 999);
    }
}

#[test]
fn both_strategies_agree() {
    let modulus = Modulus::test_128();
    let mut a = Msu::new(ModularSquare::new(Params::new(8).unwrap(), modulus.clone()).unwrap())
        .unwrap();
    let mut b = Msu::new(ModularSquareMetzgen::new(small_metzgen(), modulus.clone()).unwrap())
        .unwrap();
    let x = modulus.value() - 12345u32;
    assert_eq!(
        a.compute(&x, 33).unwrap().sq_out,
        b.compute(&x, 33).unwrap().sq_out
    );
}

fn edge_inputs_1024(modulus: &Modulus) -> [BigUint; 3] {
    let m = modulus.value();
    let one = BigUint::from(1u8);
    [m * 2u8 - &one, m - &one, (&one << 1024u32) - &one]
}

#[test]
fn default_shape_1024_strategy_a() {
    let modulus = Modulus::vdf_1024();
    let core = ModularSquare::new(Params::default(), modulus.clone()).unwrap();
    let mut msu = Msu::new(core).unwrap();
    for x in edge_inputs_1024(&modulus) {
        let job = msu.compute(&x, 30).unwrap();
        assert_eq!(job.sq_out, reference(&x, 30, &modulus));
        assert_eq!(job.cycles, 6 * 30);
    }
}

#[test]
fn default_shape_1024_strategy_b() {
    let modulus = Modulus::vdf_1024();
    let params = MetzgenParams::default();
    let latency = params.latency();
    let core = ModularSquareMetzgen::new(params, modulus.clone()).unwrap();
    let mut msu = Msu::new(core).unwrap();
    let [wide, below_m, all_ones] = edge_inputs_1024(&modulus);
    // sq_in is MOD_LEN bits wide
    assert!(matches!(msu.compute(&wide, 50), Err(vdf_msu::Error::InputRange)));
    for x in [below_m, all_ones] {
        let job = msu.compute(&x, 50).unwrap();
        assert_eq!(job.sq_out, reference(&x, 50, &modulus));
        assert_eq!(job.cycles, latency + 49);
    }
}
