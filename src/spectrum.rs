use std::cmp::Ordering;
use std::ops::Range;

use ndarray::{Array1, Axis};

use crate::error::Error;

/// Precursor of an MS2 spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Precursor {
    pub mz: f64,
    pub charge: usize,
}

/// Centroided MS2 spectrum. Peaks are kept in two parallel arrays, optionally with a third
/// array of per-peak charges (0 = unknown) once the spectrum was deisotoped with charge
/// annotation.
#[derive(Clone, Debug)]
pub struct Spectrum {
    pub mz: Array1<f64>,
    pub intensity: Array1<f64>,
    pub charges: Option<Array1<usize>>,
    pub precursors: Vec<Precursor>,
    /// Retention time in seconds
    pub rt: f64,
    pub native_id: String,
}

impl Spectrum {
    /// Creates a spectrum without precursor information.
    ///
    /// # Arguments
    /// * `mz` - m/z values
    /// * `intensity` - Intensities, same length as `mz`
    ///
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Result<Self, Error> {
        if mz.len() != intensity.len() {
            return Err(Error::ExperimentalSpectrumShape(mz.len(), intensity.len()));
        }
        Ok(Self {
            mz: Array1::from(mz),
            intensity: Array1::from(intensity),
            charges: None,
            precursors: Vec::new(),
            rt: 0.0,
            native_id: String::new(),
        })
    }

    pub fn with_precursor(mut self, mz: f64, charge: usize) -> Self {
        self.precursors.push(Precursor { mz, charge });
        self
    }

    pub fn with_native_id(mut self, native_id: &str, rt: f64) -> Self {
        self.native_id = native_id.to_string();
        self.rt = rt;
        self
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Charge annotation of the peak, 0 if unknown or not annotated.
    pub fn charge_at(&self, idx: usize) -> usize {
        self.charges
            .as_ref()
            .and_then(|charges| charges.get(idx).copied())
            .unwrap_or(0)
    }

    /// Keeps only the peaks at `indices` (in the given order).
    pub fn select(&mut self, indices: &[usize]) {
        self.mz = self.mz.select(Axis(0), indices);
        self.intensity = self.intensity.select(Axis(0), indices);
        if let Some(charges) = self.charges.as_mut() {
            *charges = charges.select(Axis(0), indices);
        }
    }

    /// Sorts the peaks by ascending m/z.
    pub fn sort_by_position(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|a, b| {
            self.mz[*a]
                .partial_cmp(&self.mz[*b])
                .unwrap_or(Ordering::Equal)
        });
        if order.windows(2).any(|w| w[0] > w[1]) {
            self.select(&order);
        }
    }

    /// Index of the peak closest to `mz`. The spectrum must be sorted by position.
    pub fn find_nearest(&self, mz: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let upper = self.mz.as_slice().map_or_else(
            || self.mz.iter().position(|peak| *peak >= mz).unwrap_or(self.len()),
            |peaks| peaks.partition_point(|peak| *peak < mz),
        );
        if upper == 0 {
            return Some(0);
        }
        if upper == self.len() {
            return Some(self.len() - 1);
        }
        if (self.mz[upper] - mz) < (mz - self.mz[upper - 1]) {
            Some(upper)
        } else {
            Some(upper - 1)
        }
    }

    /// Index range of the peaks with `lower <= mz <= upper`. The spectrum must be sorted by
    /// position.
    pub fn peaks_within(&self, lower: f64, upper: f64) -> Range<usize> {
        match self.mz.as_slice() {
            Some(peaks) => {
                let start = peaks.partition_point(|peak| *peak < lower);
                let end = peaks.partition_point(|peak| *peak <= upper);
                start..end.max(start)
            }
            None => {
                let start = self.mz.iter().take_while(|peak| **peak < lower).count();
                let end = self.mz.iter().take_while(|peak| **peak <= upper).count();
                start..end.max(start)
            }
        }
    }

    /// Summed intensity of all peaks within `tolerance` Da of `mz`.
    pub fn intensity_around(&self, mz: f64, tolerance: f64) -> f64 {
        self.mz
            .iter()
            .zip(self.intensity.iter())
            .filter(|(peak, _)| (*peak - mz).abs() <= tolerance)
            .map(|(_, intensity)| intensity)
            .sum()
    }
}
