// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextDecryptor, HomomorphicBackend};
use anyhow::{anyhow, bail, Result};
use fhe::bfv::{
    BfvParameters, BfvParametersBuilder, Ciphertext, Encoding, Plaintext, PublicKey, SecretKey,
};
use fhe_traits::{
    DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter, Serialize,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tally_utils::ArcBytes;
use tracing::trace;

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

pub fn create_shared_rng_from_u64(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed)))
}

pub fn create_shared_rng_from_entropy() -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::from_entropy()))
}

/// BFV parameter preset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BfvParamSet {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl BfvParamSet {
    /// Small single-modulus set. Fast enough for tests and demos, not for production secrecy.
    /// Aggregates are reduced modulo the plaintext modulus.
    pub fn set_2048_1032193_1() -> Self {
        Self {
            degree: 2048,
            plaintext_modulus: 1032193,
            moduli: vec![0x3FFFFFFF000001],
        }
    }

    pub fn build(&self) -> Result<Arc<BfvParameters>> {
        build_bfv_params_arc(self.degree, self.plaintext_modulus, &self.moduli)
    }
}

impl Default for BfvParamSet {
    fn default() -> Self {
        Self::set_2048_1032193_1()
    }
}

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>> {
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
        .map_err(|e| anyhow!("Error building BFV parameters: {e}"))
}

/// BFV ciphertext as held by a ledger accumulator. `Default` is the uninitialized placeholder.
#[derive(Clone, Default)]
pub struct BfvCiphertext(Option<Arc<Ciphertext>>);

impl BfvCiphertext {
    pub fn uninitialized() -> Self {
        Self(None)
    }

    fn inner(&self) -> Result<&Ciphertext> {
        self.0
            .as_deref()
            .ok_or_else(|| anyhow!("BFV ciphertext is uninitialized"))
    }
}

impl From<Ciphertext> for BfvCiphertext {
    fn from(value: Ciphertext) -> Self {
        Self(Some(Arc::new(value)))
    }
}

impl fmt::Debug for BfvCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "BfvCiphertext(..)"),
            None => write!(f, "BfvCiphertext(uninitialized)"),
        }
    }
}

/// Encryption side of a BFV keypair.
///
/// Sums are computed modulo the plaintext modulus `t`, so a ciphertext sum of up to
/// `max_addends` values is only exact while their total stays below `t`. `encrypt` enforces
/// `value * max_addends < t` for every value it accepts.
#[derive(Clone)]
pub struct BfvBackend {
    params: Arc<BfvParameters>,
    public_key: Arc<PublicKey>,
    rng: SharedRng,
    max_addends: u64,
}

impl BfvBackend {
    pub fn new(params: Arc<BfvParameters>, public_key: PublicKey, rng: SharedRng) -> Self {
        Self {
            params,
            public_key: Arc::new(public_key),
            rng,
            max_addends: 1,
        }
    }

    /// Bound values so that `max_addends` of them can be summed without wrapping. Use the
    /// ledger's maximum batch size.
    pub fn with_max_addends(mut self, max_addends: u64) -> Self {
        self.max_addends = max_addends.max(1);
        self
    }

    pub fn params(&self) -> Arc<BfvParameters> {
        self.params.clone()
    }

    /// Largest value `encrypt` accepts.
    pub fn max_value(&self) -> u64 {
        (self.params.plaintext() - 1) / self.max_addends
    }

    /// Client side encryption of a single value.
    pub fn encrypt(&self, value: u64) -> Result<BfvCiphertext> {
        if value > self.max_value() {
            bail!(
                "Value {value} exceeds {}: a sum of {} values must stay below plaintext modulus {}",
                self.max_value(),
                self.max_addends,
                self.params.plaintext()
            );
        }
        let pt = Plaintext::try_encode(&[value], Encoding::poly(), &self.params)
            .map_err(|e| anyhow!("Error encoding plaintext: {e}"))?;
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("Shared rng mutex poisoned"))?;
        let ct = self
            .public_key
            .try_encrypt(&pt, &mut *rng)
            .map_err(|e| anyhow!("Error encrypting data: {e}"))?;
        Ok(ct.into())
    }

    pub fn from_handle(&self, handle: &[u8]) -> Result<BfvCiphertext> {
        let ct = Ciphertext::from_bytes(handle, &self.params)
            .map_err(|e| anyhow!("Error deserializing ciphertext: {e}"))?;
        Ok(ct.into())
    }
}

impl HomomorphicBackend for BfvBackend {
    type Ciphertext = BfvCiphertext;

    fn encrypt_zero(&self) -> Result<BfvCiphertext> {
        self.encrypt(0)
    }

    fn add(&self, lhs: &BfvCiphertext, rhs: &BfvCiphertext) -> Result<BfvCiphertext> {
        let sum = lhs.inner()? + rhs.inner()?;
        trace!("Added BFV ciphertexts");
        Ok(sum.into())
    }

    fn is_initialized(&self, ciphertext: &BfvCiphertext) -> bool {
        ciphertext.0.is_some()
    }

    fn to_handle(&self, ciphertext: &BfvCiphertext) -> ArcBytes {
        match &ciphertext.0 {
            Some(ct) => ArcBytes::from_bytes(&ct.to_bytes()),
            None => ArcBytes::default(),
        }
    }
}

/// Decryption side of a BFV keypair.
pub struct BfvDecryptor {
    params: Arc<BfvParameters>,
    secret_key: SecretKey,
}

impl BfvDecryptor {
    pub fn new(params: Arc<BfvParameters>, secret_key: SecretKey) -> Self {
        Self { params, secret_key }
    }
}

impl CiphertextDecryptor for BfvDecryptor {
    fn decrypt_handle(&self, handle: &[u8]) -> Result<u64> {
        let ct = Ciphertext::from_bytes(handle, &self.params)
            .map_err(|e| anyhow!("Error deserializing ciphertext: {e}"))?;
        let pt = self
            .secret_key
            .try_decrypt(&ct)
            .map_err(|e| anyhow!("Error decrypting ciphertext: {e}"))?;
        let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())
            .map_err(|e| anyhow!("Error decoding plaintext: {e}"))?;
        decoded
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Decoded plaintext was empty"))
    }
}

/// Generate a fresh keypair and split it into its encrypting and decrypting halves.
pub fn generate_bfv_keys(
    param_set: &BfvParamSet,
    rng: &SharedRng,
) -> Result<(BfvBackend, BfvDecryptor)> {
    let params = param_set.build()?;
    let (sk, pk) = {
        let mut guard = rng
            .lock()
            .map_err(|_| anyhow!("Shared rng mutex poisoned"))?;
        let sk = SecretKey::random(&params, &mut *guard);
        let pk = PublicKey::new(&sk, &mut *guard);
        (sk, pk)
    };
    Ok((
        BfvBackend::new(params.clone(), pk, rng.clone()),
        BfvDecryptor::new(params, sk),
    ))
}
