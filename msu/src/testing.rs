//! Generate test instances.

use num_bigint::{BigUint, RandBigInt as _};
use num_traits::One as _;

use crate::{timing::timed, Modulus};

/// Random value below `2M`, the input range a squarer must accept.
pub fn random_input(modulus: &Modulus) -> BigUint {
    use rand_core::SeedableRng;
    let mut rng = rand::prelude::StdRng::from_entropy();

    rng.gen_biguint_below(&(modulus.value() << 1u8))
}

pub fn random_inputs(modulus: &Modulus, count: usize) -> Vec<BigUint> {
    use rand_core::SeedableRng;
    let mut rng = rand::prelude::StdRng::from_entropy();

    let bound = modulus.value() << 1u8;
    (0..count).map(|_| rng.gen_biguint_below(&bound)).collect()
}

/// `x^(2^iterations) mod M`, computed directly.
pub fn reference(x: &BigUint, iterations: u64, modulus: &Modulus) -> BigUint {
    let exponent = BigUint::one() << iterations;
    x.modpow(&exponent, modulus.value())
}

/// A random input and the expected result of squaring it `iterations` times.
pub fn harness(modulus: &Modulus, iterations: u64) -> (BigUint, BigUint) {
    let x = random_input(modulus);
    let expected = timed("reference exponentiation", || reference(&x, iterations, modulus));
    (x, expected)
}
