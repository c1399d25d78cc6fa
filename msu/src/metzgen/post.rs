//! `modular_square_metzgen_post`: `(sqa, sqb)` to the canonical residue.

use fpga::Clocked;
use num_bigint::BigUint;

use super::{iter::IterOut, moduloadd::Modulo, MetzgenParams};
use crate::Modulus;

#[derive(Clone, Debug)]
pub struct Post {
    modulo: Modulo,
    sq_out: BigUint,
    valid: bool,
}

impl Post {
    pub fn new(params: &MetzgenParams, modulus: &Modulus) -> Self {
        Self {
            modulo: Modulo::new(modulus.value(), params.mod_bit_width()),
            sq_out: BigUint::default(),
            valid: false,
        }
    }

    /// `(sqa + sqb) mod M`: reduce each half, then one modular add.
    pub fn canonical(&self, sqa: &BigUint, sqb: &BigUint) -> BigUint {
        self.modulo
            .add(&self.modulo.reduce(sqa), &self.modulo.reduce(sqb))
    }

    pub fn sq_out(&self) -> &BigUint {
        &self.sq_out
    }

    pub fn valid(&self) -> bool {
        self.valid
    }
}

impl Clocked for Post {
    type Inputs = IterOut;

    fn tick(&mut self, inputs: &IterOut) {
        // the data register only loads alongside a valid result
        if inputs.valid {
            self.sq_out = self.canonical(&inputs.sqa, &inputs.sqb);
        }
        self.valid = inputs.valid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let params = MetzgenParams {
            mod_len: 128,
            log_radix: 17,
            log_num_symbols: 3,
            io_stages: 1,
        };
        let modulus = Modulus::test_128();
        let m = modulus.value();
        let mut post = Post::new(&params, &modulus);
        let sqa = (BigUint::from(1u8) << 135u32) + 5u8;
        let sqb = m * 3u8 + 7u8;
        post.tick(&IterOut {
            sqa: sqa.clone(),
            sqb: sqb.clone(),
            valid: true,
        });
        assert!(post.valid());
        assert_eq!(*post.sq_out(), (&sqa + &sqb) % m);

        post.tick(&IterOut::default());
        assert!(!post.valid());
        assert_eq!(*post.sq_out(), (&sqa + &sqb) % m);
    }
}
