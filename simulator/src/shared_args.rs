use clap::{Args, ValueEnum};

use crate::integrate::IntegrationTolerance;
use crate::psf::{Psf, PsfError};

/// Parse a pixel position in the format "x,y"
pub fn parse_position(s: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Position must be in format 'x,y'".to_string());
    }

    let x = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid x value: {}", parts[0]))?;
    let y = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid y value: {}", parts[1]))?;

    Ok((x, y))
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsfShape {
    Gaussian,
    Moffat,
}

/// PSF selection shared by synthetic rendering binaries
#[derive(Args, Debug, Clone)]
pub struct PsfArgs {
    /// Radial profile of the point spread function
    #[arg(long, value_enum, default_value_t = PsfShape::Gaussian)]
    pub psf: PsfShape,

    /// Peak brightness at the source center
    #[arg(long, default_value_t = 1000.0)]
    pub peak: f64,

    /// Gaussian standard deviation in pixels
    #[arg(long, default_value_t = 1.5)]
    pub std: f64,

    /// Moffat core width in pixels
    #[arg(long, default_value_t = 2.0)]
    pub alpha: f64,

    /// Moffat power-law index
    #[arg(long, default_value_t = 2.5)]
    pub beta: f64,

    /// Relative tolerance of the pixel integrals
    #[arg(long, default_value_t = IntegrationTolerance::default().relative)]
    pub rel_tolerance: f64,
}

impl PsfArgs {
    pub fn build(&self) -> Result<Psf, PsfError> {
        let psf = match self.psf {
            PsfShape::Gaussian => Psf::gaussian(self.peak, self.std)?,
            PsfShape::Moffat => Psf::moffat(self.peak, self.alpha, self.beta)?,
        };
        Ok(psf.with_tolerance(IntegrationTolerance {
            relative: self.rel_tolerance,
            ..IntegrationTolerance::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psf::Profile;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        psf: PsfArgs,
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("12.5, 7").unwrap(), (12.5, 7.0));
        assert!(parse_position("12.5").is_err());
        assert!(parse_position("a,1").is_err());
        assert!(parse_position("1,2,3").is_err());
    }

    #[test]
    fn test_default_psf_is_gaussian() {
        let cli = TestCli::parse_from(["test"]);
        let psf = cli.psf.build().unwrap();
        assert!(matches!(
            psf.profile(),
            Profile::Gaussian { max, std } if *max == 1000.0 && *std == 1.5
        ));
    }

    #[test]
    fn test_moffat_selection() {
        let cli = TestCli::parse_from(["test", "--psf", "moffat", "--alpha", "3", "--beta", "4"]);
        let psf = cli.psf.build().unwrap();
        assert!(matches!(psf.profile(), Profile::Moffat { beta, .. } if *beta == 4.0));
    }

    #[test]
    fn test_degenerate_psf_rejected() {
        let cli = TestCli::parse_from(["test", "--std", "0"]);
        assert!(matches!(cli.psf.build(), Err(PsfError::InvalidParameter(_))));
    }
}
