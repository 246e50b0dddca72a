//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, Var};
use candle_nn::VarMap;
use log::trace;

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Copies every variable of `src` into the variable of the same name in `dest`.
///
/// The copy is by value; later updates of `src` do not affect `dest`.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Failed to lock the destination variables"))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Failed to lock the source variables"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is missing in the source", k_dest))?;
        v_dest.set(&v_src.as_tensor().detach())?;
    }

    Ok(())
}

/// Rescales the gradients of `vars` so that their global L2 norm is at most
/// `max_norm`.
///
/// Returns the norm before clipping. Non-finite norms are returned unchanged
/// and the gradients are left as they are.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f32> {
    let norm = grad_norm(grads, vars)?;

    if norm.is_finite() && norm as f64 > max_norm {
        let coef = max_norm / (norm as f64 + 1e-6);
        for var in vars {
            let clipped = match grads.get(var.as_tensor()) {
                Some(g) => (g * coef)?,
                None => continue,
            };
            grads.insert(var.as_tensor(), clipped);
        }
    }

    Ok(norm)
}

/// Returns the global L2 norm of the gradients of `vars`.
pub fn grad_norm(grads: &GradStore, vars: &[Var]) -> Result<f32> {
    let mut sum_sq = 0f32;
    for var in vars {
        if let Some(g) = grads.get(var.as_tensor()) {
            sum_sq += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    Ok(sum_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::Init;

    fn varmap(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((values.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (values.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    #[test]
    fn test_hard_update_copies_values() -> Result<()> {
        let vm_src = varmap(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap(&[4.0, 5.0, 6.0])?;
        hard_update(&vm_dest, &vm_src)?;

        let get = |vm: &VarMap| -> Vec<f32> {
            vm.data().lock().unwrap()["var1"]
                .as_tensor()
                .to_vec1::<f32>()
                .unwrap()
        };
        assert_eq!(get(&vm_dest), vec![1.0, 2.0, 3.0]);

        // Later updates of the source do not propagate.
        let t = Tensor::from_slice(&[7.0f32, 8.0, 9.0], (3,), &Device::Cpu)?;
        vm_src.data().lock().unwrap()["var1"].set(&t)?;
        assert_eq!(get(&vm_dest), vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_clip_grad_norm() -> Result<()> {
        let w = Var::from_slice(&[1.0f32, -2.0, 3.0], (3,), &Device::Cpu)?;
        let b = Var::from_slice(&[0.5f32], (1,), &Device::Cpu)?;
        let vars = vec![w.clone(), b.clone()];

        // loss = 1000 * (sum(w^2) + b^2), gradient = 2000 * params
        let loss = ((w.as_tensor().sqr()?.sum_all()? + b.as_tensor().sqr()?.sum_all()?)? * 1000.0)?;
        let mut grads = loss.backward()?;

        let before = clip_grad_norm(&mut grads, &vars, 5.0)?;
        let expected = 2000.0 * (1.0f32 + 4.0 + 9.0 + 0.25).sqrt();
        assert!((before - expected).abs() / expected < 1e-4);

        let after = grad_norm(&grads, &vars)?;
        assert!(after <= 5.0 + 1e-4);
        assert!(after > 4.99);
        Ok(())
    }

    #[test]
    fn test_clip_grad_norm_small_is_untouched() -> Result<()> {
        let w = Var::from_slice(&[0.1f32, 0.2], (2,), &Device::Cpu)?;
        let vars = vec![w.clone()];
        let loss = w.as_tensor().sum_all()?;
        let mut grads = loss.backward()?;

        let before = clip_grad_norm(&mut grads, &vars, 5.0)?;
        assert!((before - 2f32.sqrt()).abs() < 1e-6);
        assert_eq!(grads.get(w.as_tensor()).unwrap().to_vec1::<f32>()?, vec![1.0, 1.0]);
        Ok(())
    }
}
